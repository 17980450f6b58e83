//! RPC de gestion : méthodes, redémarrage, paramètres

use crate::values::{ListItem, ParameterValueStruct, cwmp_struct};

cwmp_struct! {
    /// Demande de la liste des méthodes supportées
    pub struct GetRPCMethods {}
}

cwmp_struct! {
    pub struct GetRPCMethodsResponse {
        pub method_list: Vec<String> => "MethodList",
    }
}

cwmp_struct! {
    /// Redémarrage du CPE
    pub struct Reboot {
        pub command_key: String => "CommandKey",
    }
}

cwmp_struct! {
    pub struct RebootResponse {}
}

cwmp_struct! {
    /// Découverte des paramètres sous `parameter_path`.
    ///
    /// Avec `next_level`, seuls les enfants directs sont listés.
    pub struct GetParameterNames {
        pub parameter_path: String => "ParameterPath",
        pub next_level: bool => "NextLevel",
    }
}

cwmp_struct! {
    pub struct ParameterInfoStruct {
        pub name: String => "Name",
        pub writable: bool => "Writable",
    }
}

impl ListItem for ParameterInfoStruct {
    const ITEM: &'static str = "ParameterInfoStruct";
}

cwmp_struct! {
    pub struct GetParameterNamesResponse {
        pub parameter_list: Vec<ParameterInfoStruct> => "ParameterList",
    }
}

cwmp_struct! {
    pub struct GetParameterValues {
        pub parameter_names: Vec<String> => "ParameterNames",
    }
}

cwmp_struct! {
    pub struct GetParameterValuesResponse {
        pub parameter_list: Vec<ParameterValueStruct> => "ParameterList",
    }
}

cwmp_struct! {
    /// Écriture de paramètres ; `parameter_key` est recopié par le CPE dans
    /// `Device.ManagementServer.ParameterKey`.
    pub struct SetParameterValues {
        pub parameter_list: Vec<ParameterValueStruct> => "ParameterList",
        pub parameter_key: String => "ParameterKey",
    }
}

cwmp_struct! {
    /// `status` vaut 0 si les valeurs sont appliquées, 1 si elles le seront
    /// après une validation différée (redémarrage...)
    pub struct SetParameterValuesResponse {
        pub status: u32 => "Status",
    }
}
