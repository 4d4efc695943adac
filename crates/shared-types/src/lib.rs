pub mod types;

pub use types::{
    AccessibilityReport, Category, GeneralCategory, GeneralReport, Issue, PageCategory,
    PageReport,
};
