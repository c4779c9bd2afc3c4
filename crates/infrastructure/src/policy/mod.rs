mod domain_list;

pub use domain_list::DomainListPolicy;
