mod common;

mod brackets;
mod computation;
mod rules;
mod service;
