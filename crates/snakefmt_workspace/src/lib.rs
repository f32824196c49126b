//! Configuration ingestion: the external collaborator named at spec.md
//! §4.7. Locates a project's `pyproject.toml` and reads its `[tool.snakefmt]`
//! and `[tool.snakefmt.script_formatter]` tables into plain option maps; the
//! CLI crate is responsible for merging those maps with command-line flags.

mod pyproject;

pub use pyproject::{
    find_project_root, find_pyproject_toml, load_options, load_script_formatter_options,
    ConfigError, ConfigResult, Options,
};
