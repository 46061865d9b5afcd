pub mod io_handle;
