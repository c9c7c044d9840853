//! Request middleware

pub mod operator;

pub use operator::operator_middleware;
