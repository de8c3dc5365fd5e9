// ABOUTME: Integration tests for the deploy step against the in-memory lab.
// ABOUTME: Covers name collisions, addressing, WinRM retries, capture, and cleanup.

mod support;

use std::time::{Duration, Instant};

use labforge::pipeline::{Action, Step, keys};
use labforge::remote::memory::{Fault, MemoryLab, Operation};
use labforge::remote::{
    DeprovisionInfo, OsType, PowerState, VirtualMachineOps, WindowsOsState,
};
use labforge::types::LabId;
use labforge::steps::{
    CaptureStep, Credentials, DeleteStep, DeployStep, PowerOffStep, WINRM_ARTIFACT,
};
use support::{Fixture, init_tracing, linux_config, windows_config};
use tokio_util::sync::CancellationToken;

fn deploy_step(fixture: &Fixture) -> DeployStep<MemoryLab> {
    let config = &fixture.config;
    let credentials = Credentials::resolve(&config.admin, config.os_type, &fixture.names).unwrap();
    let image = config.source.resolve(&config.lab_id()).unwrap();
    DeployStep::new(fixture.context(), credentials, image)
}

mod collisions {
    use super::*;

    /// Test: an existing machine with the generated name fails before any create call.
    #[tokio::test]
    async fn existing_name_halts_without_create() {
        init_tracing();
        let fixture = Fixture::new(linux_config(), MemoryLab::default());
        fixture.lab.seed_virtual_machine(
            &fixture.config.lab_id(),
            &fixture.names.compute_name,
            OsType::Linux,
        );
        let step = deploy_step(&fixture);
        let mut state = fixture.state();

        let action = step.run(&CancellationToken::new(), &mut state).await;

        assert_eq!(action, Action::Halt);
        assert_eq!(fixture.lab.call_count(Operation::CreateVirtualMachine), 0);
        let failure = state.get(keys::ERROR).unwrap();
        assert_eq!(failure.step, "deploy");
        assert!(failure.message.contains("already exists"));
        assert!(fixture.reporter.mentions("already exists"));

        // Nothing was created, so cleanup must leave the existing machine alone.
        step.cleanup(&mut state).await.unwrap();
        assert_eq!(fixture.lab.call_count(Operation::DeleteVirtualMachine), 0);
        assert_eq!(fixture.lab.virtual_machine_count(), 1);
    }

    /// Test: a failed listing is a step failure.
    #[tokio::test]
    async fn list_failure_halts() {
        let fixture = Fixture::new(linux_config(), MemoryLab::default());
        fixture
            .lab
            .inject(Operation::ListVirtualMachines, Fault::FailAlways);
        let mut state = fixture.state();

        let action = deploy_step(&fixture)
            .run(&CancellationToken::new(), &mut state)
            .await;

        assert_eq!(action, Action::Halt);
        assert_eq!(fixture.lab.call_count(Operation::CreateVirtualMachine), 0);
        assert!(!state.flag(keys::VM_CREATED));
    }
}

mod addressing {
    use super::*;

    /// Test: public addressing stores the FQDN and never reads the network interface.
    #[tokio::test]
    async fn public_address_uses_fqdn() {
        let fixture = Fixture::new(linux_config(), MemoryLab::default());
        let mut state = fixture.state();

        let action = deploy_step(&fixture)
            .run(&CancellationToken::new(), &mut state)
            .await;

        assert_eq!(action, Action::Continue);
        let host = state.get(keys::CONNECT_HOST).unwrap();
        assert!(host.starts_with(&fixture.names.compute_name));
        assert!(host.ends_with(".cloudapp.example.net"));
        assert_eq!(fixture.lab.call_count(Operation::GetNetworkInterface), 0);
        assert!(state.flag(keys::VM_CREATED));
    }

    /// Test: with public addresses disallowed the private IP is used.
    #[tokio::test]
    async fn private_address_uses_network_interface() {
        let mut config = linux_config();
        config.network.disallow_public_ip = true;
        let fixture = Fixture::new(config, MemoryLab::default());
        let mut state = fixture.state();

        let action = deploy_step(&fixture)
            .run(&CancellationToken::new(), &mut state)
            .await;

        assert_eq!(action, Action::Continue);
        assert_eq!(state.get(keys::CONNECT_HOST).unwrap(), "10.0.0.4");
        assert_eq!(fixture.lab.call_count(Operation::GetNetworkInterface), 1);
    }

    /// Test: an unreadable network interface fails the step; there is no FQDN fallback.
    #[tokio::test]
    async fn private_address_lookup_failure_halts() {
        let mut config = linux_config();
        config.network.disallow_public_ip = true;
        let fixture = Fixture::new(config, MemoryLab::default());
        fixture
            .lab
            .inject(Operation::GetNetworkInterface, Fault::FailAlways);
        let step = deploy_step(&fixture);
        let mut state = fixture.state();

        let action = step.run(&CancellationToken::new(), &mut state).await;

        assert_eq!(action, Action::Halt);
        assert!(!state.contains(keys::CONNECT_HOST.name()));
        assert!(state.flag(keys::VM_CREATED));

        step.cleanup(&mut state).await.unwrap();
        assert_eq!(fixture.lab.virtual_machine_count(), 0);
        assert!(state.flag(keys::VM_DELETED));
    }
}

mod winrm {
    use super::*;

    /// Test: N-1 failures followed by success enables WinRM.
    #[tokio::test]
    async fn retries_until_success() {
        init_tracing();
        let fixture = Fixture::new(windows_config(), MemoryLab::default());
        fixture
            .lab
            .inject(Operation::ApplyArtifacts, Fault::FailTimes(2));
        let mut state = fixture.state();

        let action = deploy_step(&fixture)
            .run(&CancellationToken::new(), &mut state)
            .await;

        assert_eq!(action, Action::Continue);
        assert_eq!(fixture.lab.call_count(Operation::ApplyArtifacts), 3);
        assert!(
            fixture
                .lab
                .applied_artifacts()
                .iter()
                .any(|a| a.name == WINRM_ARTIFACT)
        );
    }

    /// Test: persistent failures stop after exactly max_attempts calls.
    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let fixture = Fixture::new(windows_config(), MemoryLab::default());
        fixture
            .lab
            .inject(Operation::ApplyArtifacts, Fault::FailAlways);
        let step = deploy_step(&fixture);
        let mut state = fixture.state();

        let action = step.run(&CancellationToken::new(), &mut state).await;

        assert_eq!(action, Action::Halt);
        assert_eq!(fixture.lab.call_count(Operation::ApplyArtifacts), 3);
        let failure = state.get(keys::ERROR).unwrap();
        assert!(failure.message.contains("3 attempts"));
        assert!(
            failure
                .diagnostic
                .as_deref()
                .is_some_and(|body| body.contains("InjectedFault"))
        );

        step.cleanup(&mut state).await.unwrap();
        assert_eq!(fixture.lab.virtual_machine_count(), 0);
    }

    /// Test: Linux builds never touch WinRM.
    #[tokio::test]
    async fn linux_skips_winrm() {
        let fixture = Fixture::new(linux_config(), MemoryLab::default());
        let mut state = fixture.state();

        deploy_step(&fixture)
            .run(&CancellationToken::new(), &mut state)
            .await;

        assert_eq!(fixture.lab.call_count(Operation::ApplyArtifacts), 0);
    }
}

mod timeouts {
    use super::*;

    /// Test: a deployment that never finishes times out and is reported as such.
    #[tokio::test]
    async fn never_finishing_deploy_times_out() {
        let mut config = linux_config();
        config.polling.deployment_timeout = Duration::from_millis(20);
        let fixture = Fixture::new(config, MemoryLab::default());
        fixture
            .lab
            .inject(Operation::CreateVirtualMachine, Fault::NeverComplete);
        let mut state = fixture.state();

        let action = deploy_step(&fixture)
            .run(&CancellationToken::new(), &mut state)
            .await;

        assert_eq!(action, Action::Halt);
        assert!(state.get(keys::ERROR).unwrap().message.contains("timed out"));
        assert!(!state.flag(keys::VM_CREATED));
        assert_eq!(fixture.lab.virtual_machine_count(), 1);
    }

    /// Test: a create that timed out is still deleted by cleanup.
    #[tokio::test]
    async fn timed_out_create_is_cleaned_up() {
        let mut config = linux_config();
        config.polling.deployment_timeout = Duration::from_millis(20);
        let fixture = Fixture::new(config, MemoryLab::default());
        fixture
            .lab
            .inject(Operation::CreateVirtualMachine, Fault::NeverComplete);
        let step = deploy_step(&fixture);
        let mut state = fixture.state();

        let action = step.run(&CancellationToken::new(), &mut state).await;
        assert_eq!(action, Action::Halt);
        assert!(state.flag(keys::VM_CREATE_SUBMITTED));

        step.cleanup(&mut state).await.unwrap();
        assert_eq!(fixture.lab.call_count(Operation::DeleteVirtualMachine), 1);
        assert_eq!(fixture.lab.virtual_machine_count(), 0);
        assert!(state.flag(keys::VM_DELETED));
    }

    /// Test: cancelling while the create is in flight still deletes the machine.
    #[tokio::test]
    async fn cancelled_create_is_cleaned_up() {
        init_tracing();
        let fixture = Fixture::new(linux_config(), MemoryLab::default());
        fixture
            .lab
            .inject(Operation::CreateVirtualMachine, Fault::NeverComplete);
        let step = deploy_step(&fixture);
        let mut state = fixture.state();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let action = step.run(&cancel, &mut state).await;
        assert_eq!(action, Action::Halt);
        assert!(cancel.is_cancelled());
        assert_eq!(fixture.lab.virtual_machine_count(), 1);

        step.cleanup(&mut state).await.unwrap();
        assert_eq!(fixture.lab.virtual_machine_count(), 0);
        assert!(state.flag(keys::VM_DELETED));
    }
}

mod capture {
    use super::*;

    /// Test: capture waits on its own timeout, not the deployment one.
    #[tokio::test]
    async fn uses_capture_timeout() {
        let mut config = linux_config();
        config.capture.timeout = Duration::from_millis(20);
        config.polling.deployment_timeout = Duration::from_secs(5);
        let fixture = Fixture::new(config, MemoryLab::default());
        fixture
            .lab
            .inject(Operation::CreateCustomImage, Fault::NeverComplete);
        let cancel = CancellationToken::new();
        let mut state = fixture.state();

        assert_eq!(
            deploy_step(&fixture).run(&cancel, &mut state).await,
            Action::Continue
        );

        let started = Instant::now();
        let action = CaptureStep::new(fixture.context())
            .run(&cancel, &mut state)
            .await;

        assert_eq!(action, Action::Halt);
        assert!(started.elapsed() < Duration::from_secs(2));
        let failure = state.get(keys::ERROR).unwrap();
        assert_eq!(failure.step, "capture");
        assert!(failure.message.contains("timed out"));
        assert!(!state.contains(keys::CAPTURED_TEMPLATE.name()));
    }

    /// Test: a generalized Windows machine is captured with sysprep already applied.
    #[tokio::test]
    async fn windows_with_sysprep_applied() {
        let mut config = windows_config();
        config.capture.deprovision_applied = true;
        let fixture = Fixture::new(config, MemoryLab::default());
        let cancel = CancellationToken::new();
        let mut state = fixture.state();

        assert_eq!(
            deploy_step(&fixture).run(&cancel, &mut state).await,
            Action::Continue
        );
        assert_eq!(
            CaptureStep::new(fixture.context())
                .run(&cancel, &mut state)
                .await,
            Action::Continue
        );

        let image = state.get(keys::CAPTURED_TEMPLATE).unwrap();
        assert_eq!(image.os_type, OsType::Windows);
        assert_eq!(
            image.deprovision,
            DeprovisionInfo::Windows(WindowsOsState::SysprepApplied)
        );
        let stored = fixture
            .lab
            .custom_image(&fixture.config.lab_id().custom_image("golden-windows"))
            .unwrap();
        assert_eq!(stored.deprovision, image.deprovision);
    }
}

mod relocation {
    use super::*;

    /// Test: later steps address the machine in the group deploy recorded.
    #[tokio::test]
    async fn later_steps_follow_actual_resource_group() {
        init_tracing();
        let fixture = Fixture::new(
            linux_config(),
            MemoryLab::default().relocating_to("imaging-machines"),
        );
        let cancel = CancellationToken::new();
        let mut state = fixture.state();

        let action = deploy_step(&fixture).run(&cancel, &mut state).await;
        assert_eq!(action, Action::Continue);
        assert_eq!(
            state.get(keys::RESOURCE_GROUP_NAME).unwrap(),
            "imaging-machines"
        );
        let host = state.get(keys::CONNECT_HOST).unwrap().clone();

        let ctx = fixture.context();
        assert_eq!(
            PowerOffStep::new(ctx.clone()).run(&cancel, &mut state).await,
            Action::Continue
        );
        let relocated = LabId::lab("sub-1", "imaging-machines", "imaging")
            .virtual_machine(&fixture.names.compute_name);
        let machine = fixture.lab.get_virtual_machine(&relocated).await.unwrap();
        assert_eq!(machine.power_state, PowerState::Stopped);
        assert_eq!(
            CaptureStep::new(ctx.clone()).run(&cancel, &mut state).await,
            Action::Continue
        );

        let image_id = fixture.config.lab_id().custom_image("golden-linux");
        assert!(fixture.lab.custom_image(&image_id).is_some());

        assert_eq!(
            DeleteStep::new(ctx).run(&cancel, &mut state).await,
            Action::Continue
        );
        assert_eq!(fixture.lab.virtual_machine_count(), 0);
        assert!(state.flag(keys::VM_DELETED));
        assert_eq!(state.get(keys::CONNECT_HOST).unwrap(), &host);
    }
}
