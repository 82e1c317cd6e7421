pub mod work_reports;
