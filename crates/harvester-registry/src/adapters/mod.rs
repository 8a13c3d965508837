pub mod agent;
pub mod comment_site;
pub mod devalue;
pub mod html_list;
pub mod json_list;
pub mod releasebot;
pub mod rss;

pub use agent::AgentAdapter;
pub use comment_site::CommentSiteAdapter;
pub use html_list::HtmlListAdapter;
pub use json_list::JsonListAdapter;
pub use releasebot::ReleasebotAdapter;
pub use rss::RssAdapter;
