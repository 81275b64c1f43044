pub mod extraction;
pub mod filing;
pub mod manual;
