//! Integration tests for the fit adapters

// Bounded least-squares adapter
mod least_squares_tests;

// Named-variable minimization adapter
mod minimize_tests;

// Box constraints through both adapters
mod bounds_tests;
