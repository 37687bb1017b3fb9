mod http_backend;
mod search_flow;
mod stats_isolation;
