use bb84::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn simulate_single_qubit(rng: &mut StdRng) {
    println!("BB84 Eavesdropping Simulation");

    // Alice prepares a qubit
    let alice_bit = random_bit(rng);
    let alice_basis = MeasurementBasis::random(rng);
    let alice_state = generate_bb84_state(alice_bit, alice_basis);
    println!("Alice sends {:?} (bit {}, basis {})", alice_state, alice_bit as u8, alice_basis);

    // Eve measures in a random basis and resends the outcome in that basis
    let eve_basis = MeasurementBasis::random(rng);
    let eve_bit = measure_bb84_state(alice_state, eve_basis, rng);
    let eve_state = generate_bb84_state(eve_bit, eve_basis);
    println!("Eve measures in {} and resends {:?}", eve_basis, eve_state);

    let bob_basis = MeasurementBasis::random(rng);
    let bob_bit = measure_bb84_state(eve_state, bob_basis, rng);
    println!("Bob measures in {} and reads {}", bob_basis, bob_bit as u8);

    if bob_basis != alice_basis {
        println!("Bases differ, the position is discarded during sifting.");
    } else if bob_bit != alice_bit {
        println!("Bases match but the bits disagree: Eve has been detected.");
    } else {
        println!("Bases match and the bits agree.");
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(7);
    simulate_single_qubit(&mut rng);

    for eavesdropper in [false, true] {
        let round = run_round(2_000, eavesdropper, 0, &mut rng)?;
        let verdict = decide(round.qber(), QBER_THRESHOLD);
        println!(
            "eavesdropper: {:<5} sifted: {:>4} errors: {:>4} QBER: {:>6.2}% -> {:?}",
            eavesdropper,
            round.sifted_count,
            round.error_count,
            round.qber() * 100.0,
            verdict
        );
    }
    println!(
        "Intercept-resend predicts ~{:.0}% QBER, far above the {:.0}% threshold.",
        THEORETICAL_INTERCEPT_QBER * 100.0,
        QBER_THRESHOLD * 100.0
    );

    Ok(())
}
