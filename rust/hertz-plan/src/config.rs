/// Planner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// When a plan requires alignment, new-array execution also compares the
    /// engine's alignment class of every substitute buffer with the class of the
    /// buffer bound to the same slot at construction. Engine allocation alone does
    /// not guarantee equal classes for slices.
    pub verify_alignment_class: bool,
}

impl PlannerConfig {
    pub fn with_verify_alignment_class(&self, verify: bool) -> Self {
        let mut config = self.clone();
        config.verify_alignment_class = verify;
        config
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            verify_alignment_class: true,
        }
    }
}
