pub mod sa_list;
pub mod sig_info;
pub mod sig_num;
pub mod sig_pending;
pub mod sig_set;
