pub mod books;
pub mod reviews;
pub mod suggestions;

pub use reviews::{DeleteReviewPayload, ReviewPayload};
pub use suggestions::Suggestion;
