#![forbid(unsafe_code)]

pub mod add;
pub mod aggregate;
pub mod api;
pub mod batch;
pub mod catalog;
pub mod chapter;
pub mod cli;
pub mod config;
pub mod cover;
pub mod download;
pub mod error;
pub mod folders;
pub mod formats;
pub mod groups;
pub mod library;
pub mod link;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod pager;
pub mod prompt;
pub mod selection;
pub mod serve;
