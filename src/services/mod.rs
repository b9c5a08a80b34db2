pub mod rater;
