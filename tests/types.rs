// ABOUTME: Integration tests for resource identifiers and validated types.
// ABOUTME: Tests path rendering, identity rules, and name validation.

use labforge::types::*;

mod resource_ids {
    use super::*;

    #[test]
    fn lab_machine_path() {
        let id = LabId::lab("sub-1", "lab-rg", "imaging").virtual_machine("lf0123");
        assert_eq!(
            id.path(),
            "/subscriptions/sub-1/resourceGroups/lab-rg/providers/Microsoft.DevTestLab/labs/imaging/virtualmachines/lf0123"
        );
        assert_eq!(id.lab_name(), "imaging");
    }

    #[test]
    fn gallery_version_path_nests_under_image() {
        let id = GalleryImageId::gallery_image("sub-1", "gallery-rg", "shared", "ubuntu")
            .version("1.0.0");
        assert!(id.path().ends_with("/galleries/shared/images/ubuntu/versions/1.0.0"));
    }

    #[test]
    fn resource_group_compares_without_case() {
        let a = LabId::lab("sub-1", "Lab-RG", "imaging").virtual_machine("vm");
        let b = LabId::lab("sub-1", "lab-rg", "imaging").virtual_machine("vm");
        assert_eq!(a, b);
    }

    #[test]
    fn relocation_keeps_name_and_lab() {
        let id = LabId::lab("sub-1", "lab-rg", "imaging").virtual_machine("vm");
        let moved = id.in_resource_group("machines-rg");
        assert_eq!(moved.resource_group(), "machines-rg");
        assert_eq!(moved.name(), "vm");
        assert_eq!(moved.lab_name(), "imaging");
        assert_ne!(moved, id);
    }
}

mod image_names {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        for name in ["golden", "ubuntu-22.04_base", "a", "Win2022_"] {
            assert!(ImageName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_bad_names() {
        assert!(matches!(ImageName::new(""), Err(ImageNameError::Empty)));
        assert!(matches!(ImageName::new("-x"), Err(ImageNameError::InvalidStart)));
        assert!(matches!(ImageName::new("x-"), Err(ImageNameError::InvalidEnd)));
        assert!(matches!(ImageName::new("a b"), Err(ImageNameError::InvalidChar(' '))));
        assert!(matches!(
            ImageName::new(&"a".repeat(81)),
            Err(ImageNameError::TooLong)
        ));
    }
}

mod gallery_versions {
    use super::*;

    #[test]
    fn parses_three_numeric_parts() {
        let version: GalleryVersion = "1.20.3".parse().unwrap();
        assert_eq!((version.major(), version.minor(), version.patch()), (1, 20, 3));
        assert_eq!(version.to_string(), "1.20.3");
    }

    #[test]
    fn rejects_other_shapes() {
        for input in ["1.2", "1.2.3.4", "1.x.3", "", "v1.2.3"] {
            assert!(GalleryVersion::parse(input).is_err(), "{input} should fail");
        }
    }
}

mod temp_names {
    use super::*;

    #[test]
    fn names_differ_between_builds() {
        let a = TempNames::generate();
        let b = TempNames::generate();
        assert_ne!(a.compute_name, b.compute_name);
        assert_ne!(a.admin_password, b.admin_password);
    }
}
