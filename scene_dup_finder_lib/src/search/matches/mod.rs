pub mod match_group;
