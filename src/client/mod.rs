//! Client side of the aggregation core: HTTP clients for the backend and the
//! ML service, the session they share, and the source traits the loaders
//! are written against.

pub mod backend;
pub mod error;
pub mod ml;
pub mod retry;
pub mod session;
pub mod source;

pub use backend::BackendClient;
pub use error::{ClientError, ClientResult};
pub use ml::MlClient;
pub use retry::{Backoff, RetryPolicy};
pub use session::{Session, SessionContext};
pub use source::{NewUserRequest, RecipeSource, RecommendationSource, SearchPage};

#[cfg(test)]
pub use source::{MockRecipeSource, MockRecommendationSource};
