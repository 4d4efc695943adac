pub mod forms;
pub mod images;
pub mod navigation;
pub mod page_numbers;
pub mod reading_order;
pub mod structure;
