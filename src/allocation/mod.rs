//! Two-phase course seat allocation.
//!
//! Operators preview an allocation with [`AssignmentWorkflow::simulate`]
//! and persist it with [`AssignmentWorkflow::commit`]. Both run the same
//! [`Allocator`] and return the same [`AssignmentResult`] for the same
//! input, apart from the `is_simulation` flag.
//!
//! Ties and rule conflicts the allocator cannot settle on its own are
//! listed in [`AssignmentResult::students_needing_review`] instead of
//! being decided silently.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use u_timetable::allocation::{
//!     AllocationRules, AssignmentWorkflow, CourseCapacity, EnrollmentRequest,
//!     InMemoryEnrollmentStore, PriorityAllocator,
//! };
//!
//! let store = Arc::new(InMemoryEnrollmentStore::new());
//! let workflow = AssignmentWorkflow::new(Arc::new(PriorityAllocator::new(store.clone())));
//! let rules = AllocationRules::new().with_capacity("MATH", CourseCapacity::new(1, 20, 25));
//! let requests = vec![EnrollmentRequest::new("s1", "MATH", 90.0)];
//!
//! let preview = workflow.simulate(&requests, &rules);
//! assert!(preview.is_simulation);
//! assert!(store.is_empty());
//!
//! let committed = workflow.commit(&requests, &rules);
//! assert_eq!(committed.requests_approved, 1);
//! assert!(store.is_enrolled("s1", "MATH"));
//! ```

mod allocator;
mod request;
mod result;
mod store;
mod workflow;

pub use allocator::{
    AllocationDecision, Allocator, Decision, PriorityAllocator, RawAllocationOutcome, ReviewItem,
};
pub use request::{AllocationRules, CapacityStatus, CourseCapacity, EnrollmentRequest};
pub use result::{
    AssignmentResult, CourseAssignmentDetail, StudentAssignmentDetail, SUCCESS_THRESHOLD,
};
pub use store::{EnrollmentStore, InMemoryEnrollmentStore};
pub use workflow::AssignmentWorkflow;
