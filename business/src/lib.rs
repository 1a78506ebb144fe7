pub mod application {
    pub mod identification {
        pub mod pipeline;
        pub mod scheduler;
    }
}

pub mod domain {
    pub mod logger;
    pub mod identification {
        pub mod errors;
        pub mod model;
        pub mod request;
        pub mod retry;
        pub mod scheduler;
        pub mod services;
        pub mod state;
        pub mod state_machine;
        pub mod value_objects;
        pub mod use_cases {
            pub mod identify;
        }
    }
}
