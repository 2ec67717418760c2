pub mod domain {
    pub mod entities {
        pub mod subscriptions;
        pub mod users;
    }

    pub mod repositories {
        pub mod subscriptions;
        pub mod users;
    }

    pub mod value_objects {
        pub mod creem_webhook;
        pub mod plans;

        pub mod enums {
            pub mod billing_intervals;
            pub mod checkout_statuses;
            pub mod subscription_statuses;
        }
    }
}

pub mod infra {
    pub mod db {
        pub mod postgres {
            pub mod postgres_connection;
            pub mod schema;
        }

        pub mod repositories {
            pub mod subscriptions;
            pub mod users;
        }
    }
}

pub mod identity {
    pub mod supabase_auth;
}

pub mod inference {
    pub mod openrouter_client;
}

pub mod payments {
    pub mod creem_client;
}

pub mod observability;
