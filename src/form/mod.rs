/*
 * Responsibility
 * - employee self-profile form: model, validation, region cascade, controller
 */
pub mod cascade;
pub mod controller;
pub mod date;
pub mod model;
pub mod validation;

#[cfg(test)]
pub mod fakes;

pub use controller::{Collaborators, EmployeeForm, FormError, SubmitError, SubmitOutcome};
