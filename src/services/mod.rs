/*
 * Responsibility
 * - clients for the services the form depends on
 *   (employee records, regions, identity, notifications)
 */
pub mod employee_api;
pub mod error;
pub mod identity;
pub mod notify;
pub mod region_api;
