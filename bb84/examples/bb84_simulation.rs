use bb84::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(2024);
    let n = 16; // Number of qubits

    let alice_bits = random_bits(n, &mut rng);
    let alice_bases = random_bases(n, &mut rng);
    let bob_bases = random_bases(n, &mut rng);

    let bob_bits = transmit(&alice_bits, &alice_bases, &bob_bases, &mut rng)?;
    let keys = sift(&alice_bases, &bob_bases, &alice_bits, &bob_bits)?;

    println!("Alice's bits:  {}", bits_to_string(&alice_bits));
    println!(
        "Alice's bases: {}",
        alice_bases.iter().map(|b| b.label()).collect::<String>()
    );
    println!(
        "Bob's bases:   {}",
        bob_bases.iter().map(|b| b.label()).collect::<String>()
    );
    println!("Bob's bits:    {}", bits_to_string(&bob_bits));
    println!();
    println!("Kept positions: {:?}", keys.indices);
    println!("Alice's key:    {}", bits_to_string(&keys.sender_key));
    println!("Bob's key:      {}", bits_to_string(&keys.receiver_key));
    println!("QBER:           {:.2}%", keys.qber() * 100.0);

    let message = text_to_bits("Q");
    let stream = tile_key(&keys.sender_key, message.len())?;
    let ciphertext = encrypt(&message, &stream)?;
    let recovered = bits_to_text(&decrypt(&ciphertext, &stream)?);
    println!();
    println!("Ciphertext: {}", bits_to_string(&ciphertext));
    println!("Recovered:  {}", recovered);

    Ok(())
}
