//! Unified diff rendering for `--diff`, via the `similar` crate (the
//! "textual diff utility" spec.md §1 names as an external collaborator).

use std::fmt;
use std::path::Path;

use similar::TextDiff;

/// A lazily-rendered unified diff between `before` and `after`, labeled with
/// `path` on both sides (this tool never renames files).
pub struct UnifiedDiff<'a> {
    pub path: &'a Path,
    pub before: &'a str,
    pub after: &'a str,
}

impl fmt::Display for UnifiedDiff<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.path.display().to_string();
        let diff = TextDiff::from_lines(self.before, self.after);
        write!(
            f,
            "{}",
            diff.unified_diff()
                .context_radius(3)
                .header(&label, &label)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn renders_a_header_and_changed_lines() {
        let path = PathBuf::from("rules/a.smk");
        let diff = UnifiedDiff {
            path: &path,
            before: "rule a:\n\tinput: \"a\"\n",
            after: "rule a:\n    input:\n        \"a\",\n",
        };
        let rendered = diff.to_string();
        assert!(rendered.contains("rules/a.smk"));
        assert!(rendered.contains("-\tinput: \"a\""));
        assert!(rendered.contains("+    input:"));
    }
}
