pub mod health;
pub mod judging;
pub mod legacy;
pub mod validation;
