pub mod bot;
pub mod callback;
pub mod config;
pub mod content;
pub mod db;
pub mod domain;
pub mod error;
pub mod keyboard;
pub mod messenger;
pub mod player;
pub mod services;
pub mod validation;

#[cfg(test)]
pub mod testing;
