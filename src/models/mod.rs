pub mod analysismodel;
pub mod leadmodel;
pub mod usermodel;
