pub mod names;
pub mod pin_functions;
pub mod rules;
pub mod test_plan;
