// src/news/providers/mod.rs
pub mod newsapi;
pub mod rss;
