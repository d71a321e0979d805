mod helpers;
mod test_check;
mod test_init;
mod test_matrix;
mod test_plan;
mod test_run;
