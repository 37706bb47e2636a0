pub mod agent;
pub mod chat;
pub mod commit;
pub mod describe;
pub mod error;
pub mod history;
pub mod interpreter;
pub mod model;
pub mod ollama;
pub mod paths;
pub mod project;
pub mod prompt;
pub mod session;
pub mod settings;
pub mod state;
