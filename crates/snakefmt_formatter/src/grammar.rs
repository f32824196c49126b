//! Static vocabulary/grammar tables: the pure `keyword -> (next grammar,
//! parameter shape)` mapping that replaces the subclass-based dispatch of
//! the original implementation (spec.md §9, "Sum types for grammar").

/// One of the five nested grammars a keyword can open a body in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarId {
    Global,
    Rule,
    Subworkflow,
    Module,
    UseRule,
    Run,
}

impl GrammarId {
    pub fn name(self) -> &'static str {
        match self {
            GrammarId::Global => "Global",
            GrammarId::Rule => "Rule",
            GrammarId::Subworkflow => "Subworkflow",
            GrammarId::Module => "Module",
            GrammarId::UseRule => "UseRule",
            GrammarId::Run => "Run",
        }
    }

    /// `Global` and `Run` let unrecognised keywords fall through to the
    /// scripting buffer (`run:` bodies are embedded-language code, not
    /// workflow-grammar parameters); every other context is a closed
    /// vocabulary.
    pub fn accepts_scripting_code(self) -> bool {
        matches!(self, GrammarId::Global | GrammarId::Run)
    }
}

/// The arity/shape a parameter-bearing keyword's body must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    /// Exactly one positional parameter.
    SingleParam,
    /// [`ParamShape::SingleParam`], but must be emitted on one line
    /// regardless of the enclosing context's usual layout.
    InlineSingleParam,
    /// Any number of positional and keyword parameters.
    ParamList,
    /// Positional parameters only, no `key=value` pairs.
    NoKeywordParamList,
    /// Positional parameters only, with no trailing separators expected
    /// (used by `use rule … from …` specifiers).
    ParamListNoComma,
}

/// What a recognised keyword does: open a nested block, or introduce a
/// parameter list of a given shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordShape {
    Block(GrammarId),
    Params(ParamShape),
}

/// Keywords for which a name token follows the keyword before the colon
/// (`rule foo:`, `use rule foo from bar:`).
pub const NAMEABLE_KEYWORDS: &[&str] = &["rule", "checkpoint", "subworkflow", "module", "use"];

/// Top-level blocks whose first word governs the blank-line policy.
pub const RULE_LIKE_KEYWORDS: &[&str] = &["rule", "checkpoint"];

/// Keywords allowed to recur within a context that otherwise forbids
/// duplicate keywords (spec.md §9 Open Question, resolved in SPEC_FULL.md
/// §4.1: `include`/`configfile` commonly recur across conditionally
/// included sub-workflows).
pub const DUPLICATES_ALLOWED: &[&str] = &["include", "configfile"];

pub fn is_nameable(keyword: &str) -> bool {
    NAMEABLE_KEYWORDS.contains(&keyword)
}

pub fn is_rule_like(keyword: &str) -> bool {
    keyword
        .split_whitespace()
        .next()
        .is_some_and(|first| RULE_LIKE_KEYWORDS.contains(&first))
}

pub fn duplicates_allowed(keyword: &str) -> bool {
    DUPLICATES_ALLOWED.contains(&keyword)
}

/// Looks up `keyword` within `grammar`, returning its shape if recognised.
pub fn lookup(grammar: GrammarId, keyword: &str) -> Option<KeywordShape> {
    use GrammarId::*;
    use KeywordShape::{Block, Params};
    use ParamShape::*;

    match grammar {
        Global => Some(match keyword {
            "rule" | "checkpoint" => Block(Rule),
            "subworkflow" => Block(Subworkflow),
            "module" => Block(Module),
            "use" => Block(UseRule),
            "include" | "configfile" | "workdir" => Params(InlineSingleParam),
            "conda" => Params(InlineSingleParam),
            "envvars" | "pathvars" | "inputflags" | "outputflags" | "localrules" => {
                Params(NoKeywordParamList)
            }
            "singularity" | "container" => Params(InlineSingleParam),
            "storage" | "resource_scopes" | "ruleorder" | "wildcard_constraints" | "report" => {
                Params(ParamList)
            }
            "onstart" | "onsuccess" | "onerror" => Params(InlineSingleParam),
            _ => return None,
        }),
        Rule => Some(match keyword {
            "input" | "output" | "params" | "log" | "benchmark" | "resources" | "envvars"
            | "wildcard_constraints" => Params(ParamList),
            "threads" | "priority" | "retries" => Params(InlineSingleParam),
            "shell" | "script" | "notebook" | "wrapper" | "container" | "conda" | "message"
            | "version" | "default_target" => Params(InlineSingleParam),
            "run" => Block(Run),
            "shadow" | "group" | "handover" | "localrule" | "cache" => Params(InlineSingleParam),
            _ => return None,
        }),
        Subworkflow => Some(match keyword {
            "workdir" | "snakefile" | "configfile" => Params(InlineSingleParam),
            _ => return None,
        }),
        Module => Some(match keyword {
            "snakefile" | "meta_wrapper" | "config" => Params(InlineSingleParam),
            "skip_validation" | "replace_prefix" => Params(InlineSingleParam),
            _ => return None,
        }),
        // `use rule * from other as other_* with:` -- `as <name>` lives on
        // the header line (parse_header's "use" special case absorbs it as
        // literal text up to the top-level colon); `with:` introduces a
        // rule-grammar parameter block, so the body vocabulary mirrors
        // `Rule`'s, plus `exclude` for the rule-subset specifier.
        UseRule => Some(match keyword {
            "input" | "output" | "params" | "log" | "benchmark" | "resources" | "envvars"
            | "wildcard_constraints" => Params(ParamList),
            "threads" | "priority" | "retries" => Params(InlineSingleParam),
            "shell" | "script" | "notebook" | "wrapper" | "container" | "conda" | "message"
            | "version" | "default_target" => Params(InlineSingleParam),
            "run" => Block(Run),
            "shadow" | "group" | "handover" | "localrule" | "cache" => Params(InlineSingleParam),
            "exclude" => Params(ParamListNoComma),
            _ => return None,
        }),
        Run => None,
    }
}

/// Complete keyword set of a grammar, used by the build-time completeness
/// test (spec.md §8: "Grammar completeness").
pub fn keywords(grammar: GrammarId) -> &'static [&'static str] {
    match grammar {
        GrammarId::Global => &[
            "rule",
            "checkpoint",
            "subworkflow",
            "module",
            "include",
            "configfile",
            "workdir",
            "conda",
            "envvars",
            "singularity",
            "container",
            "storage",
            "resource_scopes",
            "pathvars",
            "inputflags",
            "outputflags",
            "use",
            "ruleorder",
            "localrules",
            "onstart",
            "onsuccess",
            "onerror",
            "wildcard_constraints",
            "report",
        ],
        GrammarId::Rule => &[
            "input",
            "output",
            "params",
            "log",
            "benchmark",
            "resources",
            "threads",
            "shell",
            "script",
            "notebook",
            "wrapper",
            "container",
            "conda",
            "message",
            "priority",
            "shadow",
            "group",
            "retries",
            "handover",
            "default_target",
            "localrule",
            "cache",
            "run",
            "version",
            "envvars",
            "wildcard_constraints",
        ],
        GrammarId::Subworkflow => &["workdir", "snakefile", "configfile"],
        GrammarId::Module => &[
            "snakefile",
            "meta_wrapper",
            "config",
            "skip_validation",
            "replace_prefix",
        ],
        GrammarId::UseRule => &[
            "input",
            "output",
            "params",
            "log",
            "benchmark",
            "resources",
            "threads",
            "shell",
            "script",
            "notebook",
            "wrapper",
            "container",
            "conda",
            "message",
            "priority",
            "shadow",
            "group",
            "retries",
            "handover",
            "default_target",
            "localrule",
            "cache",
            "run",
            "version",
            "envvars",
            "wildcard_constraints",
            "exclude",
        ],
        GrammarId::Run => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Spec.md §8: "Grammar completeness" -- the table's keyword set must be
    /// a bijection against the frozen keyword list in every grammar, and
    /// `lookup` must recognise exactly that list.
    #[test]
    fn grammar_is_complete() {
        for grammar in [
            GrammarId::Global,
            GrammarId::Rule,
            GrammarId::Subworkflow,
            GrammarId::Module,
            GrammarId::UseRule,
            GrammarId::Run,
        ] {
            let declared: HashSet<&str> = keywords(grammar).iter().copied().collect();
            for kw in &declared {
                assert!(
                    lookup(grammar, kw).is_some(),
                    "{grammar:?} claims to recognise {kw:?} but lookup() does not"
                );
            }
            let spurious: Vec<&str> = [
                "rule", "checkpoint", "subworkflow", "module", "include", "configfile",
                "workdir", "conda", "envvars", "singularity", "container", "storage",
                "resource_scopes", "pathvars", "inputflags", "outputflags", "use", "ruleorder",
                "localrules", "onstart", "onsuccess", "onerror", "wildcard_constraints", "report",
                "input", "output", "params", "log", "benchmark", "resources", "threads", "shell",
                "script", "notebook", "wrapper", "message", "priority", "shadow", "group",
                "retries", "handover", "default_target", "localrule", "cache", "run", "version",
                "snakefile", "meta_wrapper", "config", "skip_validation", "replace_prefix",
                "exclude",
            ]
            .iter()
            .filter(|kw| lookup(grammar, kw).is_some() && !declared.contains(*kw))
            .copied()
            .collect();
            assert!(spurious.is_empty(), "{grammar:?}: {spurious:?}");
        }
    }

    #[test]
    fn nameable_and_rule_like_are_disjoint_from_params() {
        assert!(is_nameable("rule"));
        assert!(is_rule_like("checkpoint"));
        assert!(!is_rule_like("include"));
        assert!(duplicates_allowed("include"));
        assert!(!duplicates_allowed("input"));
    }
}
