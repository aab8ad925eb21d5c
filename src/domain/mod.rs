// Domain layer: grading records and the delivery port. No mail or file system code here.

pub mod model;
pub mod ports;
