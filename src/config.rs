//! Small, `Default` + builder-style configuration structs covering
//! pre-allocation sizing. None of these values affect behavior, only how
//! much capacity is reserved up front.

/// Tunable pre-allocation sizes for one [`crate::scheduler::Scheduler`]
/// instance. None of these change behavior, only how much capacity is
/// reserved up front.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Initial capacity of the depth-indexed prioritized-write bucket array.
    pub depth_bucket_capacity: usize,
    /// Initial capacity of the component arena.
    pub component_slab_capacity: usize,
    /// Initial capacity of the element-id arena.
    pub element_slab_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            depth_bucket_capacity: 16,
            component_slab_capacity: 100,
            element_slab_capacity: 2000,
        }
    }
}

impl SchedulerConfig {
    pub fn with_depth_bucket_capacity(mut self, cap: usize) -> Self {
        self.depth_bucket_capacity = cap;
        self
    }

    pub fn with_component_slab_capacity(mut self, cap: usize) -> Self {
        self.component_slab_capacity = cap;
        self
    }

    pub fn with_element_slab_capacity(mut self, cap: usize) -> Self {
        self.element_slab_capacity = cap;
        self
    }
}
