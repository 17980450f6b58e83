//! Transferts de fichiers

use crate::values::{Time, cwmp_struct};

cwmp_struct! {
    /// Résultat d'un transfert ; `fault_code` 0 en cas de succès
    pub struct FaultStruct {
        pub fault_code: u32 => "FaultCode",
        pub fault_string: String => "FaultString",
    }
}

cwmp_struct! {
    /// Fin d'un transfert demandé par l'ACS
    pub struct TransferComplete {
        pub command_key: String => "CommandKey",
        pub fault_struct: FaultStruct => "FaultStruct",
        pub start_time: Time => "StartTime",
        pub complete_time: Time => "CompleteTime",
    }
}

cwmp_struct! {
    pub struct TransferCompleteResponse {}
}

cwmp_struct! {
    /// Fin d'un transfert décidé par le CPE lui-même
    pub struct AutonomousTransferComplete {
        pub announce_url: String => "AnnounceURL",
        pub transfer_url: String => "TransferURL",
        pub is_download: bool => "IsDownload",
        pub file_type: String => "FileType",
        pub file_size: u32 => "FileSize",
        pub target_file_name: String => "TargetFileName",
        pub fault_struct: FaultStruct => "FaultStruct",
        pub start_time: Time => "StartTime",
        pub complete_time: Time => "CompleteTime",
    }
}

cwmp_struct! {
    pub struct AutonomousTransferCompleteResponse {}
}

cwmp_struct! {
    /// Téléchargement d'un fichier par le CPE (`"1 Firmware Upgrade Image"`...)
    pub struct Download {
        pub command_key: String => "CommandKey",
        pub file_type: String => "FileType",
        pub url: String => "URL",
        pub username: String => "Username",
        pub password: String => "Password",
        pub file_size: u32 => "FileSize",
        pub target_file_name: String => "TargetFileName",
        pub delay_seconds: u32 => "DelaySeconds",
        pub success_url: String => "SuccessURL",
        pub failure_url: String => "FailureURL",
    }
}

cwmp_struct! {
    /// `status` 0 : téléchargement terminé ; 1 : en cours, un
    /// TransferComplete suivra
    pub struct DownloadResponse {
        pub status: u32 => "Status",
        pub start_time: Time => "StartTime",
        pub complete_time: Time => "CompleteTime",
    }
}
