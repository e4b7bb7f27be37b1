//! Pattern-based stack lookup.
//!
//! Selects stacks across stages by case-sensitive glob patterns and returns
//! them in deployment order. Glob semantics are those of [`glob::Pattern`]:
//! `*`, `?`, and `[...]` character classes.

use glob::Pattern;

use crate::config::document::DeploymentDocument;
use crate::config::stack::StackConfig;

impl DeploymentDocument {
    /// Find every stack whose stage matches `stage_pattern` and whose
    /// identifier matches `stack_pattern`.
    ///
    /// The result is stably sorted ascending by stack order, so callers
    /// deploy front to back; ties keep the index's stage-then-stack
    /// encounter order. A pattern that is not valid glob syntax matches
    /// nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use cumulus::DeploymentDocument;
    ///
    /// let document = DeploymentDocument::load_str(
    ///     "Stages:\n  dev:\n    web:\n      Template: a.yaml\n  prod:\n    web:\n      Template: a.yaml\n",
    ///     ".",
    /// ).unwrap();
    ///
    /// assert_eq!(document.search_stacks("*", "*").len(), 2);
    /// assert_eq!(document.search_stacks("prod", "*").len(), 1);
    /// ```
    #[must_use]
    pub fn search_stacks(&self, stage_pattern: &str, stack_pattern: &str) -> Vec<&StackConfig> {
        let Ok(stage_glob) = Pattern::new(stage_pattern) else {
            log::debug!("invalid stage pattern \"{stage_pattern}\"");
            return Vec::new();
        };
        let Ok(stack_glob) = Pattern::new(stack_pattern) else {
            log::debug!("invalid stack pattern \"{stack_pattern}\"");
            return Vec::new();
        };

        let mut matches: Vec<&StackConfig> = self
            .stage_index()
            .iter()
            .filter(|(stage_id, _)| stage_glob.matches(stage_id))
            .flat_map(|(_, stacks)| {
                stacks
                    .iter()
                    .filter(|(stack_id, _)| stack_glob.matches(stack_id))
                    .map(|(_, config)| config)
            })
            .collect();

        // Stable sort: equal orders keep encounter order.
        matches.sort_by_key(|config| config.stack_order());
        matches
    }

    /// All stacks of the document, in deployment order.
    ///
    /// Equivalent to `search_stacks("*", "*")`.
    #[must_use]
    pub fn all_stacks(&self) -> Vec<&StackConfig> {
        self.search_stacks("*", "*")
    }
}
