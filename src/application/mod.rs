// Application layer - Run lifecycle behind the job server seam
pub mod job_server;
pub mod telemetry_consumer;
