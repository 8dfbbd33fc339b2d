pub mod signal_analysis;
