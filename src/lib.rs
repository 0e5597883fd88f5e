pub mod app_config;
pub mod catalog;
pub mod constants;
pub mod create_user;
pub mod db;
pub mod error;
pub mod membership;
pub mod middleware;
pub mod orm;
pub mod pagination;
pub mod recipes;
pub mod seed;
pub mod session;
pub mod shopping_list;
pub mod storage;
pub mod subscriptions;
pub mod user;
pub mod web;
