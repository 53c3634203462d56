pub mod paired_slots;
pub mod task_group;
pub mod thread_pool;
pub mod versioned_slot;
