pub mod devig;
pub mod health;
