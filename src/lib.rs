pub mod config;
pub mod content;
pub mod draft_promoter;
pub mod error;
pub mod logger;
pub mod paginator;
pub mod post;
pub mod publish_planner;
pub mod publisher;
pub mod server;
pub mod site_assembler;
pub mod text_utils;
pub mod util;
pub mod view;

#[cfg(test)]
mod test_data;
