//! 浏览器连接
//!
//! 连接已打开的浏览器（调试端口），或启动一个无头浏览器

pub mod connection;
pub mod headless;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_headless_browser;
