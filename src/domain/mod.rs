pub mod thermometer;
