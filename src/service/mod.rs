pub mod analysis_worker;
pub mod error;
pub mod gemini_service;
pub mod solar_api_service;
pub mod storage_service;
