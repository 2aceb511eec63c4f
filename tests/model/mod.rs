//! Integration tests for the equation model

// Evaluation order, evaluation and errors
mod evaluation_tests;

// Substitution and model independence
mod substitution_tests;
