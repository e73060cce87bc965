pub mod credentials;
pub mod web;
pub mod youtube;

pub use credentials::CredentialPool;
pub use web::WebContextClient;
pub use youtube::{VideoClient, VideoResult};
