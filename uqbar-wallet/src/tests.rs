mod test_utils;
mod tests_send_flow;
mod tests_sync;
