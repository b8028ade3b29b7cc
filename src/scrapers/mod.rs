pub mod browser;
pub mod crawler;
pub mod extractor;
pub mod parser;
pub mod traits;
pub mod types;

pub use browser::{random_user_agent, ChromeRenderer};
pub use crawler::CrawlController;
pub use traits::Renderer;
pub use types::CrawlConfig;
