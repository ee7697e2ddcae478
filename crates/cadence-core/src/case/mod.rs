//! Case subscriptions and the recorder that persists matching events.

pub mod recorder;
pub mod subscription;

pub use recorder::CaseRecorder;
pub use subscription::SubscriptionRegistry;
